//! GL constants and extension string matching

/// `GL_COLOR_BUFFER_BIT`
pub const GL_COLOR_BUFFER_BIT: u32 = 0x0000_4000;
/// `GL_VERSION`
pub const GL_VERSION: u32 = 0x1F02;
/// `GL_EXTENSIONS`
pub const GL_EXTENSIONS: u32 = 0x1F03;
/// `GL_NUM_EXTENSIONS`
pub const GL_NUM_EXTENSIONS: u32 = 0x821D;
/// `GL_CONTEXT_FLAGS`
pub const GL_CONTEXT_FLAGS: u32 = 0x821E;
/// `GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT`
pub const GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT: i32 = 0x0001;
/// `GL_CONTEXT_FLAG_DEBUG_BIT`
pub const GL_CONTEXT_FLAG_DEBUG_BIT: i32 = 0x0002;
/// `GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR`
pub const GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR: i32 = 0x0008;
/// `GL_CONTEXT_PROFILE_MASK`
pub const GL_CONTEXT_PROFILE_MASK: u32 = 0x9126;
/// `GL_CONTEXT_CORE_PROFILE_BIT`
pub const GL_CONTEXT_CORE_PROFILE_BIT: i32 = 0x0001;
/// `GL_CONTEXT_COMPATIBILITY_PROFILE_BIT`
pub const GL_CONTEXT_COMPATIBILITY_PROFILE_BIT: i32 = 0x0002;
/// `GL_RESET_NOTIFICATION_STRATEGY_ARB`
pub const GL_RESET_NOTIFICATION_STRATEGY_ARB: u32 = 0x8256;
/// `GL_LOSE_CONTEXT_ON_RESET_ARB`
pub const GL_LOSE_CONTEXT_ON_RESET_ARB: i32 = 0x8252;
/// `GL_NO_RESET_NOTIFICATION_ARB`
pub const GL_NO_RESET_NOTIFICATION_ARB: i32 = 0x8261;
/// `GL_CONTEXT_RELEASE_BEHAVIOR`
pub const GL_CONTEXT_RELEASE_BEHAVIOR: u32 = 0x82FB;
/// `GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH`
pub const GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH: i32 = 0x82FC;

/// Whether `name` appears as a whole token in a space-separated extension list
///
/// `"GL_ARB_foo"` does not match inside `"GL_ARB_foo_bar"`.
pub fn string_in_extension_string(name: &str, extensions: &str) -> bool {
    !name.is_empty() && extensions.split(' ').any(|token| token == name)
}

/// Split a version string into its client API prefix and numbers
///
/// Recognizes the OpenGL ES prefixes and parses `major.minor[.revision]` from
/// the start of the remainder. Returns `(is_es, major, minor, revision)`.
pub fn parse_version_string(version: &str) -> Option<(bool, i32, i32, i32)> {
    const ES_PREFIXES: [&str; 3] = ["OpenGL ES-CM ", "OpenGL ES-CL ", "OpenGL ES "];

    let (is_es, rest) = ES_PREFIXES
        .iter()
        .find_map(|prefix| version.strip_prefix(prefix))
        .map_or((false, version), |rest| (true, rest));

    let mut numbers = rest
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or_default()
        .split('.')
        .map(str::parse::<i32>);

    let major = numbers.next()?.ok()?;
    let minor = numbers.next().and_then(Result::ok).unwrap_or(0);
    let revision = numbers.next().and_then(Result::ok).unwrap_or(0);
    Some((is_es, major, minor, revision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_token_match() {
        let extensions = "GL_ARB_debug_output GL_ARB_robustness_isolation GL_KHR_debug";
        assert!(string_in_extension_string("GL_ARB_debug_output", extensions));
        assert!(string_in_extension_string("GL_KHR_debug", extensions));
        assert!(!string_in_extension_string("GL_ARB_robustness", extensions));
        assert!(!string_in_extension_string("GL_ARB_debug", extensions));
        assert!(!string_in_extension_string("", extensions));
    }

    #[test]
    fn test_match_at_boundaries() {
        assert!(string_in_extension_string("A", "A"));
        assert!(string_in_extension_string("A", "B A"));
        assert!(string_in_extension_string("A", "A B "));
        assert!(!string_in_extension_string("A", "AB BA"));
    }

    #[test]
    fn test_parse_desktop_version() {
        assert_eq!(parse_version_string("4.6.0 NVIDIA 535.54"), Some((false, 4, 6, 0)));
        assert_eq!(parse_version_string("3.3 (Core Profile) Mesa 23.1"), Some((false, 3, 3, 0)));
        assert_eq!(parse_version_string("2.1.2"), Some((false, 2, 1, 2)));
    }

    #[test]
    fn test_parse_es_version() {
        assert_eq!(parse_version_string("OpenGL ES 3.2 Mesa"), Some((true, 3, 2, 0)));
        assert_eq!(parse_version_string("OpenGL ES-CM 1.1"), Some((true, 1, 1, 0)));
        assert_eq!(parse_version_string("OpenGL ES-CL 1.0"), Some((true, 1, 0, 0)));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_version_string("OpenGL ES garbage"), None);
        assert_eq!(parse_version_string(""), None);
    }
}

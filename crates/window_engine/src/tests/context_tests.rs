use super::platform;
use crate::backend::headless::HeadlessContext;
use crate::context::extensions::{
    GL_CONTEXT_CORE_PROFILE_BIT, GL_CONTEXT_FLAGS, GL_CONTEXT_FLAG_DEBUG_BIT, GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT,
    GL_CONTEXT_PROFILE_MASK, GL_LOSE_CONTEXT_ON_RESET_ARB, GL_RESET_NOTIFICATION_STRATEGY_ARB,
};
use crate::context::{ContextApi, ContextBackend, ContextConfig, ContextProfile, ContextRobustness};
use crate::foundation::collections::WindowId;
use crate::{EngineError, Platform};

fn headless_id(platform: &Platform, id: WindowId) -> u64 {
    platform
        .window(id)
        .and_then(|w| w.context())
        .and_then(|c| c.backend().as_any().downcast_ref::<HeadlessContext>())
        .map(HeadlessContext::id)
        .unwrap()
}

#[test]
fn test_make_current_and_clear() {
    let (mut platform, handle) = platform();
    let id = platform.open_window("Current", 320, 240, None).unwrap();

    platform.make_context_current(Some(id)).unwrap();
    assert_eq!(platform.current_context(), Some(id));
    assert_eq!(handle.current_context(), Some(headless_id(&platform, id)));

    platform.make_context_current(None).unwrap();
    assert_eq!(platform.current_context(), None);
    assert_eq!(handle.current_context(), None);
}

#[test]
fn test_destroying_current_window_clears_context() {
    let (mut platform, handle) = platform();
    let id = platform.open_window("Current", 320, 240, None).unwrap();
    platform.make_context_current(Some(id)).unwrap();

    platform.destroy_window(id).unwrap();
    assert_eq!(platform.current_context(), None);
    assert_eq!(handle.current_context(), None);
    assert_eq!(handle.live_contexts(), 0);
    assert_eq!(platform.destroy_window(id), Err(EngineError::NoSuchWindow));
}

#[test]
fn test_queries_need_a_current_context() {
    let (mut platform, handle) = platform();
    handle.set_gl_extensions(&["GL_ARB_debug_output", "GL_ARB_sync"]);
    handle.set_platform_extensions(&["WGL_EXT_swap_control"]);
    let id = platform.open_window("Queries", 320, 240, None).unwrap();

    assert_eq!(platform.extension_supported("GL_ARB_sync"), Err(EngineError::NoCurrentContext));
    assert_eq!(platform.swap_interval(1), Err(EngineError::NoCurrentContext));
    assert!(platform.proc_address("glClear").is_none());

    platform.make_context_current(Some(id)).unwrap();
    assert!(matches!(platform.extension_supported(""), Err(EngineError::InvalidValue(_))));
    assert_eq!(platform.extension_supported("GL_ARB_sync"), Ok(true));
    assert_eq!(platform.extension_supported("GL_ARB"), Ok(false));
    assert_eq!(platform.extension_supported("WGL_EXT_swap_control"), Ok(true));
    assert!(platform.proc_address("glClear").is_some());

    platform.swap_interval(1).unwrap();
    assert_eq!(handle.swap_interval(), 1);
}

#[test]
fn test_granted_profile_and_flags_are_read_back() {
    let (mut platform, handle) = platform();
    handle.set_gl_version("4.6.0 NVIDIA 550.54");
    handle.set_gl_extensions(&["GL_ARB_robustness"]);
    handle.set_gl_integer(GL_CONTEXT_FLAGS, GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT | GL_CONTEXT_FLAG_DEBUG_BIT);
    handle.set_gl_integer(GL_CONTEXT_PROFILE_MASK, GL_CONTEXT_CORE_PROFILE_BIT);
    handle.set_gl_integer(GL_RESET_NOTIFICATION_STRATEGY_ARB, GL_LOSE_CONTEXT_ON_RESET_ARB);

    platform.hints_mut().context = ContextConfig::default()
        .with_version(ContextApi::OpenGl, 4, 1)
        .with_profile(ContextProfile::Core)
        .with_forward(true);
    let id = platform.open_window("Core", 320, 240, None).unwrap();

    let attributes = *platform.window(id).unwrap().context().unwrap().attributes();
    assert_eq!((attributes.major, attributes.minor, attributes.revision), (4, 6, 0));
    assert_eq!(attributes.profile, ContextProfile::Core);
    assert!(attributes.forward);
    assert!(attributes.debug);
    assert!(!attributes.no_error);
    assert_eq!(attributes.robustness, ContextRobustness::LoseContextOnReset);
}

#[test]
fn test_es_version_string() {
    let (mut platform, handle) = platform();
    handle.set_gl_version("OpenGL ES 3.2 Mesa 24.0");
    platform.hints_mut().context = ContextConfig::default().with_version(ContextApi::OpenGlEs, 2, 0);
    let id = platform.open_window("ES", 320, 240, None).unwrap();

    let attributes = platform.window(id).unwrap().context().unwrap().attributes();
    assert_eq!(attributes.api, ContextApi::OpenGlEs);
    assert_eq!((attributes.major, attributes.minor), (3, 2));
    assert_eq!(attributes.profile, ContextProfile::Any);
}

#[test]
fn test_creation_restores_previous_context() {
    let (mut platform, handle) = platform();
    let first = platform.open_window("First", 320, 240, None).unwrap();
    platform.make_context_current(Some(first)).unwrap();

    let second = platform.open_window("Second", 320, 240, None).unwrap();
    assert_ne!(first, second);
    assert_eq!(platform.current_context(), Some(first));
    assert_eq!(handle.current_context(), Some(headless_id(&platform, first)));

    platform.hints_mut().context = ContextConfig::default().with_version(ContextApi::OpenGl, 4, 5);
    assert!(platform.open_window("Failing", 320, 240, None).is_err());
    assert_eq!(platform.current_context(), Some(first));
    assert_eq!(handle.current_context(), Some(headless_id(&platform, first)));
}

#[test]
fn test_context_sharing() {
    let (mut platform, handle) = platform();
    let first = platform.open_window("First", 320, 240, None).unwrap();

    platform.hints_mut().context.share = Some(first);
    platform.open_window("Second", 320, 240, None).unwrap();
    assert_eq!(handle.last_shared_context(), Some(headless_id(&platform, first)));

    platform.hints_mut().context.api = ContextApi::None;
    assert!(matches!(platform.open_window("Bare", 320, 240, None), Err(EngineError::InvalidArgument(_))));

    platform.hints_mut().context.api = ContextApi::OpenGl;
    platform.destroy_window(first).unwrap();
    assert_eq!(platform.open_window("Orphan", 320, 240, None), Err(EngineError::NoSuchWindow));
    assert_eq!(platform.windows().len(), 1);
}

#[test]
fn test_sharing_with_contextless_window_fails() {
    let (mut platform, _handle) = platform();
    platform.hints_mut().context.api = ContextApi::None;
    let bare = platform.open_window("Bare", 320, 240, None).unwrap();

    platform.hints_mut().context = ContextConfig::default().with_share(Some(bare));
    assert_eq!(platform.open_window("Sharer", 320, 240, None), Err(EngineError::NoWindowContext));
}

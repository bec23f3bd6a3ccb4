//! Headless native contexts, GL driver and dynamic libraries

use std::any::Any;

use super::{fake_address, Shared, State};
use crate::backend::{BackendError, BackendResult, DynamicLibrary, NativeHandle, ProcAddress};
use crate::context::extensions::{GL_EXTENSIONS, GL_NUM_EXTENSIONS, GL_VERSION};
use crate::context::{ContextBackend, GlFunctions};

/// Entry point lookup against the scripted driver
pub(super) fn gl_proc_address(state: &State, name: &str) -> Option<ProcAddress> {
    if name.is_empty() || state.gl.missing.iter().any(|m| m == name) {
        return None;
    }
    Some(fake_address(name))
}

/// Native context record
pub struct HeadlessContext {
    id: u64,
    window: NativeHandle,
    pixel_format: u64,
    state: Shared,
    destroyed: bool,
}

impl HeadlessContext {
    pub(super) fn new(id: u64, window: NativeHandle, pixel_format: u64, state: Shared) -> Self {
        Self {
            id,
            window,
            pixel_format,
            state,
            destroyed: false,
        }
    }

    /// Context id, as reported by [`super::HeadlessHandle::current_context`]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Window the context renders into
    pub fn window(&self) -> NativeHandle {
        self.window
    }

    /// Handle of the pixel format chosen by the engine
    pub fn pixel_format(&self) -> u64 {
        self.pixel_format
    }
}

impl ContextBackend for HeadlessContext {
    fn make_current(&mut self) -> BackendResult<()> {
        if self.destroyed {
            return Err(BackendError::Failed("Context was destroyed".to_string()));
        }
        let mut state = self.state.borrow_mut();
        state.contexts.make_current_calls += 1;
        state.contexts.current = Some(self.id);
        Ok(())
    }

    fn release_current(&mut self) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        state.contexts.make_current_calls += 1;
        state.contexts.current = None;
        Ok(())
    }

    fn swap_buffers(&mut self) -> BackendResult<()> {
        self.state.borrow_mut().contexts.swaps += 1;
        Ok(())
    }

    fn swap_interval(&mut self, interval: i32) -> BackendResult<()> {
        self.state.borrow_mut().contexts.swap_interval = interval;
        Ok(())
    }

    fn platform_extension_supported(&self, name: &str) -> bool {
        self.state.borrow().gl.platform_extensions.iter().any(|e| e == name)
    }

    fn proc_address(&self, name: &str) -> Option<ProcAddress> {
        gl_proc_address(&self.state.borrow(), name)
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        let mut state = self.state.borrow_mut();
        state.contexts.live -= 1;
        if state.contexts.current == Some(self.id) {
            state.contexts.current = None;
        }
        state.record(format!("destroy_context:{}", self.id));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// GL query functions bound to the scripted driver
pub(super) struct HeadlessGl {
    state: Shared,
    indexed: bool,
}

impl HeadlessGl {
    pub fn new(state: Shared, indexed: bool) -> Self {
        Self { state, indexed }
    }
}

impl GlFunctions for HeadlessGl {
    fn get_integer(&self, pname: u32) -> i32 {
        let state = self.state.borrow();
        if pname == GL_NUM_EXTENSIONS {
            return i32::try_from(state.gl.extensions.len()).unwrap_or(i32::MAX);
        }
        state.gl.integers.get(&pname).copied().unwrap_or(0)
    }

    fn get_string(&self, name: u32) -> Option<String> {
        let state = self.state.borrow();
        match name {
            GL_VERSION => Some(state.gl.version.clone()),
            GL_EXTENSIONS => Some(state.gl.extensions.join(" ")),
            _ => None,
        }
    }

    fn get_string_indexed(&self, name: u32, index: u32) -> Option<String> {
        if !self.indexed || name != GL_EXTENSIONS {
            return None;
        }
        let state = self.state.borrow();
        state.gl.extensions.get(usize::try_from(index).ok()?).cloned()
    }

    fn clear(&self, _mask: u32) {
        self.state.borrow_mut().contexts.clears += 1;
    }
}

/// A library listed with [`super::HeadlessHandle::add_library`]
pub(super) struct HeadlessLibrary {
    name: String,
    state: Shared,
}

impl HeadlessLibrary {
    pub fn new(name: &str, state: Shared) -> Self {
        Self {
            name: name.to_string(),
            state,
        }
    }

    fn is_egl(&self) -> bool {
        self.name.contains("EGL")
    }
}

impl DynamicLibrary for HeadlessLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self, name: &str) -> Option<ProcAddress> {
        if name.starts_with("egl") {
            return self.is_egl().then(|| fake_address(name));
        }
        if self.is_egl() {
            return None;
        }
        gl_proc_address(&self.state.borrow(), name)
    }
}

impl Drop for HeadlessLibrary {
    fn drop(&mut self) {
        self.state.borrow_mut().record(format!("close_library:{}", self.name));
    }
}

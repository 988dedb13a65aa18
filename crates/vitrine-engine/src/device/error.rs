use std::fmt;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    pub fn from_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

/// Surface failure the runtime cannot recover from.
///
/// Returned through `anyhow::Error`; use [`FatalSurfaceError::is_fatal`] to
/// tell it apart from per-frame failures.
#[derive(Debug)]
pub struct FatalSurfaceError(pub wgpu::SurfaceError);

impl FatalSurfaceError {
    pub fn is_fatal(err: &anyhow::Error) -> bool {
        err.chain().any(|e| e.downcast_ref::<FatalSurfaceError>().is_some())
    }
}

impl fmt::Display for FatalSurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fatal surface error: {}", self.0)
    }
}

impl std::error::Error for FatalSurfaceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn out_of_memory_is_fatal() {
        assert_eq!(SurfaceErrorAction::from_error(&wgpu::SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
        assert_eq!(SurfaceErrorAction::from_error(&wgpu::SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(SurfaceErrorAction::from_error(&wgpu::SurfaceError::Lost), SurfaceErrorAction::Reconfigured);
    }

    #[test]
    fn fatal_survives_added_context() {
        let err: anyhow::Result<()> = Err(FatalSurfaceError(wgpu::SurfaceError::OutOfMemory).into());
        let err = err.context("failed to render #3").unwrap_err();
        assert!(FatalSurfaceError::is_fatal(&err));
        assert!(!FatalSurfaceError::is_fatal(&anyhow::anyhow!("bind failed")));
    }
}

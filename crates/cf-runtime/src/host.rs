use cf_core::FunnelError;

/// Side effects the player asks its embedding to perform.
pub trait FunnelHost {
    /// Opens an external destination. Failures are logged by the player and
    /// otherwise ignored.
    fn open_url(&mut self, url: &str) -> Result<(), FunnelError>;

    /// First choice or action of a playthrough.
    fn on_interaction(&mut self) {}

    fn on_restart(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NoopHost;

impl FunnelHost for NoopHost {
    fn open_url(&mut self, _url: &str) -> Result<(), FunnelError> {
        Ok(())
    }
}

use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ViewerOptions: u64 {
        /// Verbose logging, extra diagnostics
        const Debug = 1 << 0;

        /// Join the shared room over /live?
        const LiveSession = 1 << 1;

        /// Reload when the server restarts?
        const RestartWatch = 1 << 2;
    }
}

impl Default for ViewerOptions {
    fn default() -> Self {
        ViewerOptions::LiveSession | ViewerOptions::RestartWatch
    }
}

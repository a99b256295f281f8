/// Input for the render loop, queued by the window shell and drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Resized { width: u32, height: u32 },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Entered on quit or on a fatal error; no frame is produced afterwards.
    Terminating,
}

//! Text overlay hook

/// Text console drawn on top of the shown scene
///
/// The display starts the overlay once it knows its size and restarts it
/// whenever rotation changes the logical width and height.
pub trait Terminal {
    /// Lay the terminal out for a `width` x `height` display
    fn start(&mut self, width: u16, height: u16);

    /// Tear the terminal down
    fn stop(&mut self);
}

/// No overlay
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerminal;

impl Terminal for NoTerminal {
    fn start(&mut self, _width: u16, _height: u16) {}

    fn stop(&mut self) {}
}

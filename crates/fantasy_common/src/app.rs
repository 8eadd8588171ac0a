use crate::key::Key;

/// A machine a frontend can drive one frame at a time.
///
/// The frontend owns the window and the event loop; it checks
/// [`App::should_exit`] at the top of every frame, forwards key events, and
/// hands the app an RGB24 screen buffer of `width * height * 3` bytes.
pub trait App {
    fn init(&mut self);
    fn update(&mut self, screen: &mut [u8]);
    fn handle_key_event(&mut self, key: Key, is_down: bool);
    fn should_exit(&self) -> bool;
    fn exit(&mut self);

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn scale(&self) -> u32;
    fn title(&self) -> String;

    /// Target frames per second.
    fn fps(&self) -> u32 {
        60
    }
}

use fantasy_common::app::App;

/// Drives an [`App`] without a window.
///
/// Mirrors the SDL frontend's loop: check the close signal, then run one
/// frame into a scratch RGB24 buffer. There is no frame pacing.
pub struct HeadlessContext;

impl HeadlessContext {
    /// Run until the app wants to exit or `max_frames` frames have been
    /// driven; returns the number of frames driven.
    pub fn run(app: &mut impl App, max_frames: u64) -> u64 {
        let mut screen_state = vec![0u8; (app.width() * app.height() * 3) as usize];
        app.init();
        let mut frames = 0;
        while frames < max_frames {
            if app.should_exit() {
                break;
            }
            app.update(&mut screen_state);
            frames += 1;
        }
        app.exit();
        log::debug!("headless run finished after {frames} frames");
        frames
    }
}

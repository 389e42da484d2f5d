pub(crate) mod color;
pub(crate) mod log;
pub(crate) mod result;

use cmscan_lib::{PlainFormatter, ResultFormatter};
use supports_color::Stream;

use crate::options::OutputMode;

/// Detects whether a terminal supports color, and gives details about that
/// support. It takes into account the `NO_COLOR` environment variable.
fn supports_color() -> bool {
    supports_color::on(Stream::Stdout).is_some()
}

/// Create a result formatter based on the given output mode
pub(crate) fn get_result_formatter(mode: &OutputMode) -> Box<dyn ResultFormatter> {
    if !supports_color() {
        return Box::new(PlainFormatter);
    }
    match mode {
        OutputMode::Plain => Box::new(PlainFormatter),
        OutputMode::Color => Box::new(result::ColorFormatter),
    }
}

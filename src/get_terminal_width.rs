use terminal_size::{terminal_size, Width};

/// Width for clap's help output: the terminal width minus `margin`,
/// or 80 if stdout is not a terminal.
pub fn get_terminal_width(margin: usize) -> usize {
    if let Some((Width(width), _)) = terminal_size() {
        usize::from(width).saturating_sub(margin).max(40)
    } else {
        80
    }
}

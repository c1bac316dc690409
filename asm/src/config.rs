/// Knobs shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Longest accepted label, colon excluded.
    pub max_label_len: usize,
    /// Report an error and skip the line instead of halting.
    pub continue_on_error: bool,
    /// Narrate the stages on stdout.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_label_len: 6,
            continue_on_error: false,
            verbose: false,
        }
    }
}

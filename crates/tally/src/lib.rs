//! Tally tracks personal expenses against recurring budget caps from an
//! interactive shell or a piped script.

pub mod cli;
pub mod errors;
pub mod insights;
pub mod utils;

/// Initializes global tracing. Safe to call more than once.
pub fn init() {
    utils::init_tracing();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}

pub mod sweeper;
#[cfg(test)]
mod tests;

pub use sweeper::RetentionSweeper;

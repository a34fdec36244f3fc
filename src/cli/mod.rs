pub mod rate;
pub mod setup;
pub mod test_rate;
pub mod ui;

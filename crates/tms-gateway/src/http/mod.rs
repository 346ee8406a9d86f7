pub mod health;
pub mod schedule_status;
pub mod schedules;

#[cfg(test)]
pub(crate) mod test_support;

// shared fakes and helpers for the integration test suite

pub mod port_fakes;

#![allow(dead_code)]

pub mod app_builder;
pub mod flaky_store;

#![allow(non_snake_case)]

pub mod inference;
pub mod management;
pub mod utils;
pub mod web;

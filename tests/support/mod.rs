#![allow(dead_code)]

pub mod c_eval;
pub mod fixtures;

// Each integration test binary compiles this module; not every binary uses
// every helper.
#![allow(dead_code)]

pub mod api_server;
pub mod stub;

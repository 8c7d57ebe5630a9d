//! Library half of `hn-cli`: offline helpers the commands and integration
//! tests share.

pub mod render;

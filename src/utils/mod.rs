// src/utils/mod.rs

pub mod guard;
pub mod hash;
pub mod html;
pub mod jwt;

#![cfg(test)]

mod scenarios;
mod scripted_rng;

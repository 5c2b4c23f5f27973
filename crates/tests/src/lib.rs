//! Integration scenarios for the combination engine

#[cfg(test)]
mod combination_cycle;

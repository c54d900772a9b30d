mod delivery;
mod determinism;
mod drops;
mod topology;

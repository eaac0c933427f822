//! Discrete-time simulation of FIFO, SJF, STCF and Round-Robin scheduling
//! on a single processor.

pub mod scheduler;

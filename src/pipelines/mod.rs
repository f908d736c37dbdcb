pub mod group_qc;
pub mod star_stats;

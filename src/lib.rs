pub mod dynamics;
pub mod experiment;
pub mod output;
pub mod params;
pub mod report;
pub mod scenarios;
pub mod sweep;

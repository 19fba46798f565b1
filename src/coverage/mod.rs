//! Time coverage extraction from downloaded data files
//!
//! The renamer needs the time range a file covers. That range lives in two
//! text-valued global attributes of the file's self-describing header. The
//! [`CoverageReader`] trait abstracts reading them:
//!
//! - [`NetcdfCoverageReader`]: parses NetCDF classic headers natively and
//!   hands NetCDF-4 files to [`NcdumpReader`]
//! - custom readers can be plugged into the client with
//!   [`UframeClient::with_coverage_reader`](crate::UframeClient::with_coverage_reader)

pub mod classic;
mod ncdump;
mod netcdf;
mod traits;

pub use ncdump::NcdumpReader;
pub use netcdf::NetcdfCoverageReader;
pub use traits::CoverageReader;

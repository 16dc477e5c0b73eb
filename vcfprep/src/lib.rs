#[cfg(feature = "core")]
#[doc(inline)]
pub use vcfprep_core as core;

#[cfg(feature = "variants")]
#[doc(inline)]
pub use vcfprep_variants as variants;

#[cfg(feature = "qc")]
#[doc(inline)]
pub use vcfprep_qc as qc;

#[cfg(feature = "io")]
#[doc(inline)]
pub use vcfprep_io as io;

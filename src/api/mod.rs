pub mod dsfm;

pub mod ztm;

// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Detection of DNA-elimination breakpoints marked by soft-clipped telomere
//! arrays in aligned reads.

#[macro_use]
extern crate log;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;

pub mod alignment;
pub mod breakpoint_sequences;
pub mod calling;
pub mod cli;
pub mod clustering;
pub mod constants;
pub mod errors;
pub mod foci;
pub mod output;
pub mod reference;
pub mod telomere_arrays;
pub mod utils;

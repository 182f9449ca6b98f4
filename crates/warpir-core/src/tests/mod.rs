/*! Test coverage for the core IR layer.
 *
 * The value model and the builder carry the whole frontend, so these tests
 * pin down the parts everything else leans on: structural type equality, the
 * primitive flattening order, value slicing, and the guard-stack build
 * discipline.
 */

#![allow(unused_imports)]

mod builder_tests;
mod instruction_tests;
mod type_tests;

//! Binary tests.

mod check_flag_test;

mod color_tests;
mod observed_tests;

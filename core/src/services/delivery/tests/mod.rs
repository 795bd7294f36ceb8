
mod dispatcher_tests;

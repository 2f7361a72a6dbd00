mod sanitize_tests;

#[allow(unused)] // used in tests
pub fn init_default_logging() {
    dphist::util::log_util::init();
}

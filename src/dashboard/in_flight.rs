/// Holds a component's `is_submitting` flag for the duration of a request.
///
/// The flag is cleared on drop, so a submit future dropped mid-await does not
/// leave the component stuck in the submitting state.
pub(crate) struct InFlight<'a> {
    flag: &'a mut bool,
}

impl<'a> InFlight<'a> {
    pub(crate) fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

pub(crate) mod origin;

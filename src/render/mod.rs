pub(crate) mod background;
pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod frame;
pub(crate) mod layout;
pub(crate) mod surface;

use soap_adapter::{AdapterError, Model, Property, PropertyKind};
use std::sync::Arc;

/// Storage name shared by the model and the service's response envelope.
pub const STORAGE_NAME: &str = "heffalump";

/// `Heffalump { id (key), color, num_spots, striped }`
pub fn heffalump() -> Result<Arc<Model>, AdapterError> {
    Model::builder("Heffalump")
        .storage_name(STORAGE_NAME)
        .property(Property::new("id", PropertyKind::Integer).key())
        .property(Property::new("color", PropertyKind::Text))
        .property(Property::new("num_spots", PropertyKind::Integer))
        .property(Property::new("striped", PropertyKind::Boolean))
        .build()
}

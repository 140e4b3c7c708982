//! Standard catalog entities
//!
//! Descriptors for the three entity types sharing the catalog. Deployments
//! with different schemas build their own with [`EntityDescriptor::builder`].

use crate::entity::{EntityDescriptor, FieldSpec, FilterSpec};
use crate::error::DescriptorError;

/// Course levels accepted by the `level` filter
pub const COURSE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Course categories accepted by the `category` filter
pub const COURSE_CATEGORIES: [&str; 3] = ["mindfulness", "movement", "crafts"];

/// Event formats accepted by the `format` filter
pub const EVENT_FORMATS: [&str; 2] = ["online", "in_person"];

/// Product categories accepted by the `category` filter
pub const PRODUCT_CATEGORIES: [&str; 3] = ["books", "audio", "accessories"];

pub fn courses() -> Result<EntityDescriptor, DescriptorError> {
	EntityDescriptor::builder("courses")
		.field(FieldSpec::text("title").title().localized("title_fr"))
		.field(
			FieldSpec::text("description")
				.description()
				.localized("description_fr"),
		)
		.field(FieldSpec::numeric("price"))
		.field(FieldSpec::enumeration("level"))
		.field(FieldSpec::enumeration("category"))
		.field(FieldSpec::numeric("duration_minutes"))
		.filter(FilterSpec::min("minPrice", "price").non_negative())
		.filter(FilterSpec::max("maxPrice", "price").non_negative())
		.filter(FilterSpec::one_of("level", "level", COURSE_LEVELS))
		.filter(FilterSpec::one_of("category", "category", COURSE_CATEGORIES))
		.filter(FilterSpec::max("maxDuration", "duration_minutes").non_negative())
		.secondary_sort("title")
		.build()
}

/// Events are time-bound: those that already ended are hidden by default
pub fn events() -> Result<EntityDescriptor, DescriptorError> {
	EntityDescriptor::builder("events")
		.field(FieldSpec::text("title").title().localized("title_fr"))
		.field(
			FieldSpec::text("description")
				.description()
				.localized("description_fr"),
		)
		.field(FieldSpec::text("city"))
		.field(FieldSpec::enumeration("format"))
		.field(FieldSpec::numeric("price"))
		.field(FieldSpec::date("starts_at"))
		.field(FieldSpec::date("ends_at"))
		.filter(FilterSpec::min("minPrice", "price").non_negative())
		.filter(FilterSpec::max("maxPrice", "price").non_negative())
		.filter(FilterSpec::equals("city", "city"))
		.filter(FilterSpec::one_of("format", "format", EVENT_FORMATS))
		.filter(FilterSpec::min("startsAfter", "starts_at"))
		.filter(FilterSpec::max("startsBefore", "starts_at"))
		.expires_at("ends_at")
		.secondary_sort("title")
		.build()
}

pub fn products() -> Result<EntityDescriptor, DescriptorError> {
	EntityDescriptor::builder("products")
		.field(FieldSpec::text("title").title().localized("title_fr"))
		.field(
			FieldSpec::text("description")
				.description()
				.localized("description_fr"),
		)
		.field(FieldSpec::numeric("price"))
		.field(FieldSpec::enumeration("category"))
		.field(FieldSpec::boolean("in_stock"))
		.filter(FilterSpec::min("minPrice", "price").non_negative())
		.filter(FilterSpec::max("maxPrice", "price").non_negative())
		.filter(FilterSpec::one_of("category", "category", PRODUCT_CATEGORIES))
		.filter(FilterSpec::flag("inStock", "in_stock"))
		.secondary_sort("title")
		.build()
}

/// All standard descriptors
pub fn all() -> Result<Vec<EntityDescriptor>, DescriptorError> {
	Ok(vec![courses()?, events()?, products()?])
}

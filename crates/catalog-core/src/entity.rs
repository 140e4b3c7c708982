//! Entity definitions
//!
//! An [`EntityDescriptor`] describes one catalog entity type (courses, events,
//! products): its table, the fields available for search and display, and the
//! filters callers may apply. Descriptors are built once at startup and are
//! immutable afterwards; [`EntityDescriptorBuilder::build`] validates every
//! identifier so that nothing unchecked can reach generated query text.

use crate::error::DescriptorError;
use crate::types::Identifier;
use std::collections::HashSet;

/// Name of the computed relevance column in data query results
pub const RELEVANCE_COLUMN: &str = "relevance";

/// Value domain of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
	Text,
	Numeric,
	Date,
	/// Text restricted to a closed set of values
	Enum,
	Boolean,
}

/// Ranking role of a text field
///
/// Title-class fields default to a higher ranking weight than
/// description-class fields; the actual weights come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldRole {
	Title,
	Description,
	#[default]
	Other,
}

/// One entity field available for search and display
///
/// # Examples
///
/// ```
/// use catalog_core::{FieldKind, FieldRole, FieldSpec};
///
/// let title = FieldSpec::text("title").title().localized("title_fr");
/// assert_eq!(title.kind(), FieldKind::Text);
/// assert_eq!(title.role(), FieldRole::Title);
/// assert!(title.localizable());
/// assert!(title.is_searchable());
///
/// let price = FieldSpec::numeric("price");
/// assert!(!price.localizable());
/// assert!(!price.is_searchable());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
	name: Identifier,
	column: Identifier,
	kind: FieldKind,
	role: FieldRole,
	weight: Option<f64>,
	localized_column: Option<Identifier>,
}

impl FieldSpec {
	/// Create a field whose column has the same name as the field
	pub fn new(name: &str, kind: FieldKind) -> Self {
		Self {
			name: Identifier::deferred(name),
			column: Identifier::deferred(name),
			kind,
			role: FieldRole::Other,
			weight: None,
			localized_column: None,
		}
	}

	pub fn text(name: &str) -> Self {
		Self::new(name, FieldKind::Text)
	}

	pub fn numeric(name: &str) -> Self {
		Self::new(name, FieldKind::Numeric)
	}

	pub fn date(name: &str) -> Self {
		Self::new(name, FieldKind::Date)
	}

	pub fn enumeration(name: &str) -> Self {
		Self::new(name, FieldKind::Enum)
	}

	pub fn boolean(name: &str) -> Self {
		Self::new(name, FieldKind::Boolean)
	}

	/// Read the base value from a differently named column
	pub fn column(mut self, column: &str) -> Self {
		self.column = Identifier::deferred(column);
		self
	}

	/// Mark as a title-class ranking field
	pub fn title(mut self) -> Self {
		self.role = FieldRole::Title;
		self
	}

	/// Mark as a description-class ranking field
	pub fn description(mut self) -> Self {
		self.role = FieldRole::Description;
		self
	}

	/// Override the role's configured ranking weight
	pub fn weight(mut self, weight: f64) -> Self {
		self.weight = Some(weight);
		self
	}

	/// Declare the column holding the secondary-locale value
	pub fn localized(mut self, column: &str) -> Self {
		self.localized_column = Some(Identifier::deferred(column));
		self
	}

	pub fn name(&self) -> &Identifier {
		&self.name
	}

	pub fn base_column(&self) -> &Identifier {
		&self.column
	}

	pub fn localized_column(&self) -> Option<&Identifier> {
		self.localized_column.as_ref()
	}

	pub fn kind(&self) -> FieldKind {
		self.kind
	}

	pub fn role(&self) -> FieldRole {
		self.role
	}

	/// Explicit weight, if one was given
	pub fn explicit_weight(&self) -> Option<f64> {
		self.weight
	}

	pub fn localizable(&self) -> bool {
		self.localized_column.is_some()
	}

	/// Whether the field takes part in full-text matching and ranking
	pub fn is_searchable(&self) -> bool {
		self.kind == FieldKind::Text && (self.role != FieldRole::Other || self.weight.is_some())
	}

	fn validate(&self) -> Result<(), DescriptorError> {
		self.name.validate()?;
		self.column.validate()?;
		if let Some(localized) = &self.localized_column {
			localized.validate()?;
		}
		if let Some(weight) = self.weight
			&& !(weight.is_finite() && weight > 0.0)
		{
			return Err(DescriptorError::InvalidWeight {
				field: self.name.to_string(),
				weight,
			});
		}
		Ok(())
	}
}

/// Which end of a range a filter bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeBound {
	/// Inclusive lower bound (`column >= value`)
	Min,
	/// Inclusive upper bound (`column <= value`)
	Max,
}

/// How a filter constrains its field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
	Range(RangeBound),
	/// Equality against one value of a closed set
	OneOf(Vec<String>),
	/// Equality against free text
	Equals,
	/// Boolean equality
	Flag,
}

/// A named request filter bound to one entity field
///
/// # Examples
///
/// ```
/// use catalog_core::{FilterKind, FilterSpec, RangeBound};
///
/// let min_price = FilterSpec::min("minPrice", "price").non_negative();
/// assert_eq!(min_price.name(), "minPrice");
/// assert_eq!(min_price.kind(), &FilterKind::Range(RangeBound::Min));
///
/// let level = FilterSpec::one_of("level", "level", ["beginner", "intermediate", "advanced"]);
/// assert!(level.allows("beginner"));
/// assert!(!level.allows("expert"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
	name: String,
	field: Identifier,
	column: Identifier,
	value_kind: FieldKind,
	kind: FilterKind,
	non_negative: bool,
}

impl FilterSpec {
	fn new(name: &str, field: &str, kind: FilterKind) -> Self {
		Self {
			name: name.to_string(),
			field: Identifier::deferred(field),
			column: Identifier::deferred(field),
			value_kind: FieldKind::Text,
			kind,
			non_negative: false,
		}
	}

	pub fn min(name: &str, field: &str) -> Self {
		Self::new(name, field, FilterKind::Range(RangeBound::Min))
	}

	pub fn max(name: &str, field: &str) -> Self {
		Self::new(name, field, FilterKind::Range(RangeBound::Max))
	}

	pub fn one_of<I, S>(name: &str, field: &str, allowed: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let allowed = allowed.into_iter().map(Into::into).collect();
		Self::new(name, field, FilterKind::OneOf(allowed))
	}

	pub fn equals(name: &str, field: &str) -> Self {
		Self::new(name, field, FilterKind::Equals)
	}

	pub fn flag(name: &str, field: &str) -> Self {
		Self::new(name, field, FilterKind::Flag)
	}

	/// Reject negative values for a numeric range filter
	pub fn non_negative(mut self) -> Self {
		self.non_negative = true;
		self
	}

	/// Request key of the filter
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Name of the field the filter constrains
	pub fn field(&self) -> &Identifier {
		&self.field
	}

	/// Column compared by the filter
	pub fn column(&self) -> &Identifier {
		&self.column
	}

	/// Kind of the constrained field
	pub fn value_kind(&self) -> FieldKind {
		self.value_kind
	}

	pub fn kind(&self) -> &FilterKind {
		&self.kind
	}

	pub fn is_non_negative(&self) -> bool {
		self.non_negative
	}

	/// Whether a text value belongs to the filter's closed set
	pub fn allows(&self, value: &str) -> bool {
		match &self.kind {
			FilterKind::OneOf(allowed) => allowed.iter().any(|candidate| candidate == value),
			_ => false,
		}
	}

	fn bind_to(&mut self, field: &FieldSpec) -> Result<(), DescriptorError> {
		let compatible = match &self.kind {
			FilterKind::Range(_) => matches!(field.kind(), FieldKind::Numeric | FieldKind::Date),
			FilterKind::OneOf(allowed) => {
				if allowed.is_empty() {
					return Err(DescriptorError::EmptyAllowedValues(self.name.clone()));
				}
				matches!(field.kind(), FieldKind::Enum | FieldKind::Text)
			}
			FilterKind::Equals => matches!(field.kind(), FieldKind::Enum | FieldKind::Text),
			FilterKind::Flag => field.kind() == FieldKind::Boolean,
		};
		if !compatible {
			return Err(DescriptorError::IncompatibleFilter {
				filter: self.name.clone(),
				column: field.name().to_string(),
			});
		}
		self.column = field.base_column().clone();
		self.value_kind = field.kind();
		Ok(())
	}
}

/// Immutable description of one catalog entity type
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
	name: String,
	table: Identifier,
	primary_key: Identifier,
	fields: Vec<FieldSpec>,
	filters: Vec<FilterSpec>,
	published_column: Identifier,
	deleted_column: Identifier,
	expiry_column: Option<Identifier>,
	secondary_sort: Identifier,
}

impl EntityDescriptor {
	/// Start describing an entity stored in a table of the same name
	pub fn builder(name: &str) -> EntityDescriptorBuilder {
		EntityDescriptorBuilder::new(name)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn table(&self) -> &Identifier {
		&self.table
	}

	pub fn primary_key(&self) -> &Identifier {
		&self.primary_key
	}

	pub fn fields(&self) -> &[FieldSpec] {
		&self.fields
	}

	pub fn field(&self, name: &str) -> Option<&FieldSpec> {
		self.fields.iter().find(|field| field.name().as_str() == name)
	}

	/// Text fields taking part in matching and ranking, in declaration order
	pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
		self.fields.iter().filter(|field| field.is_searchable())
	}

	pub fn filters(&self) -> &[FilterSpec] {
		&self.filters
	}

	pub fn filter(&self, name: &str) -> Option<&FilterSpec> {
		self.filters.iter().find(|filter| filter.name() == name)
	}

	pub fn published_column(&self) -> &Identifier {
		&self.published_column
	}

	pub fn deleted_column(&self) -> &Identifier {
		&self.deleted_column
	}

	/// Column after which a time-bound entity is considered elapsed
	pub fn expiry_column(&self) -> Option<&Identifier> {
		self.expiry_column.as_ref()
	}

	pub fn is_time_bound(&self) -> bool {
		self.expiry_column.is_some()
	}

	/// Field used to break relevance ties
	pub fn secondary_sort_field(&self) -> &FieldSpec {
		// build() guarantees the sort field is declared
		self.field(self.secondary_sort.as_str())
			.unwrap_or(&self.fields[0])
	}
}

/// Builder for [`EntityDescriptor`]
///
/// # Examples
///
/// ```
/// use catalog_core::{EntityDescriptor, FieldSpec, FilterSpec};
///
/// let courses = EntityDescriptor::builder("courses")
///     .field(FieldSpec::text("title").title().localized("title_fr"))
///     .field(FieldSpec::text("description").description())
///     .field(FieldSpec::numeric("price"))
///     .filter(FilterSpec::min("minPrice", "price"))
///     .secondary_sort("title")
///     .build()
///     .unwrap();
///
/// assert_eq!(courses.table().as_str(), "courses");
/// assert_eq!(courses.searchable_fields().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EntityDescriptorBuilder {
	name: String,
	table: Identifier,
	primary_key: Identifier,
	fields: Vec<FieldSpec>,
	filters: Vec<FilterSpec>,
	published_column: Identifier,
	deleted_column: Identifier,
	expiry_column: Option<Identifier>,
	secondary_sort: Identifier,
}

impl EntityDescriptorBuilder {
	fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			table: Identifier::deferred(name),
			primary_key: Identifier::deferred("id"),
			fields: Vec::new(),
			filters: Vec::new(),
			published_column: Identifier::deferred("is_published"),
			deleted_column: Identifier::deferred("deleted_at"),
			expiry_column: None,
			secondary_sort: Identifier::deferred("title"),
		}
	}

	pub fn table(mut self, table: &str) -> Self {
		self.table = Identifier::deferred(table);
		self
	}

	pub fn primary_key(mut self, column: &str) -> Self {
		self.primary_key = Identifier::deferred(column);
		self
	}

	pub fn published_column(mut self, column: &str) -> Self {
		self.published_column = Identifier::deferred(column);
		self
	}

	pub fn deleted_column(mut self, column: &str) -> Self {
		self.deleted_column = Identifier::deferred(column);
		self
	}

	/// Make the entity time-bound: rows whose `column` lies in the past are
	/// excluded unless a request opts in
	pub fn expires_at(mut self, column: &str) -> Self {
		self.expiry_column = Some(Identifier::deferred(column));
		self
	}

	pub fn field(mut self, field: FieldSpec) -> Self {
		self.fields.push(field);
		self
	}

	pub fn filter(mut self, filter: FilterSpec) -> Self {
		self.filters.push(filter);
		self
	}

	pub fn secondary_sort(mut self, field: &str) -> Self {
		self.secondary_sort = Identifier::deferred(field);
		self
	}

	/// Validate and freeze the definition
	pub fn build(self) -> Result<EntityDescriptor, DescriptorError> {
		for ident in [
			&self.table,
			&self.primary_key,
			&self.published_column,
			&self.deleted_column,
			&self.secondary_sort,
		] {
			ident.validate()?;
		}
		if let Some(expiry) = &self.expiry_column {
			expiry.validate()?;
		}

		let mut seen = HashSet::new();
		seen.insert(self.primary_key.as_str());
		for field in &self.fields {
			field.validate()?;
			if field.name().as_str() == RELEVANCE_COLUMN {
				return Err(DescriptorError::ReservedName(RELEVANCE_COLUMN.to_string()));
			}
			if !seen.insert(field.name().as_str()) {
				return Err(DescriptorError::DuplicateField(field.name().to_string()));
			}
		}

		if !self
			.fields
			.iter()
			.any(|field| field.name() == &self.secondary_sort)
		{
			return Err(DescriptorError::UnknownSortField(
				self.secondary_sort.to_string(),
			));
		}

		let mut filters = self.filters;
		let mut filter_names = HashSet::new();
		for filter in &mut filters {
			filter.field.validate()?;
			if !filter_names.insert(filter.name.clone()) {
				return Err(DescriptorError::DuplicateFilter(filter.name.clone()));
			}
			let field = self
				.fields
				.iter()
				.find(|field| field.name() == &filter.field)
				.ok_or_else(|| DescriptorError::IncompatibleFilter {
					filter: filter.name.clone(),
					column: filter.field.to_string(),
				})?;
			filter.bind_to(field)?;
		}

		Ok(EntityDescriptor {
			name: self.name,
			table: self.table,
			primary_key: self.primary_key,
			fields: self.fields,
			filters,
			published_column: self.published_column,
			deleted_column: self.deleted_column,
			expiry_column: self.expiry_column,
			secondary_sort: self.secondary_sort,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn base() -> EntityDescriptorBuilder {
		EntityDescriptor::builder("courses")
			.field(FieldSpec::text("title").title())
			.field(FieldSpec::numeric("price"))
	}

	#[rstest]
	fn test_defaults() {
		let entity = base().build().unwrap();
		assert_eq!(entity.primary_key().as_str(), "id");
		assert_eq!(entity.published_column().as_str(), "is_published");
		assert_eq!(entity.deleted_column().as_str(), "deleted_at");
		assert!(!entity.is_time_bound());
		assert_eq!(entity.secondary_sort_field().name().as_str(), "title");
	}

	#[rstest]
	fn test_rejects_unsafe_column_names() {
		let err = base()
			.field(FieldSpec::text("summary").localized("summary_fr; --"))
			.build()
			.unwrap_err();
		assert_eq!(
			err,
			DescriptorError::InvalidIdentifier("summary_fr; --".to_string())
		);
	}

	#[rstest]
	fn test_requires_declared_sort_field() {
		let err = EntityDescriptor::builder("products")
			.field(FieldSpec::text("name"))
			.build()
			.unwrap_err();
		assert_eq!(err, DescriptorError::UnknownSortField("title".to_string()));
	}

	#[rstest]
	fn test_rejects_duplicate_and_reserved_fields() {
		assert_eq!(
			base().field(FieldSpec::numeric("price")).build().unwrap_err(),
			DescriptorError::DuplicateField("price".to_string())
		);
		assert_eq!(
			base().field(FieldSpec::numeric("id")).build().unwrap_err(),
			DescriptorError::DuplicateField("id".to_string())
		);
		assert_eq!(
			base()
				.field(FieldSpec::numeric("relevance"))
				.build()
				.unwrap_err(),
			DescriptorError::ReservedName("relevance".to_string())
		);
	}

	#[rstest]
	#[case(0.0)]
	#[case(-1.0)]
	#[case(f64::NAN)]
	fn test_rejects_invalid_weights(#[case] weight: f64) {
		let err = base()
			.field(FieldSpec::text("summary").weight(weight))
			.build()
			.unwrap_err();
		assert!(matches!(err, DescriptorError::InvalidWeight { .. }));
	}

	#[rstest]
	fn test_filter_binds_to_field_column() {
		let entity = base()
			.field(FieldSpec::numeric("cost").column("price_cents"))
			.filter(FilterSpec::max("maxCost", "cost"))
			.build()
			.unwrap();
		let filter = entity.filter("maxCost").unwrap();
		assert_eq!(filter.column().as_str(), "price_cents");
		assert_eq!(filter.value_kind(), FieldKind::Numeric);
	}

	#[rstest]
	fn test_rejects_incompatible_filters() {
		let range_on_text = base().filter(FilterSpec::min("minTitle", "title")).build();
		assert!(matches!(
			range_on_text,
			Err(DescriptorError::IncompatibleFilter { .. })
		));

		let unknown_field = base().filter(FilterSpec::flag("inStock", "in_stock")).build();
		assert!(matches!(
			unknown_field,
			Err(DescriptorError::IncompatibleFilter { .. })
		));

		let empty = base()
			.field(FieldSpec::enumeration("level"))
			.filter(FilterSpec::one_of("level", "level", Vec::<String>::new()))
			.build();
		assert_eq!(
			empty.unwrap_err(),
			DescriptorError::EmptyAllowedValues("level".to_string())
		);
	}

	#[rstest]
	fn test_rejects_duplicate_filters() {
		let err = base()
			.filter(FilterSpec::min("minPrice", "price"))
			.filter(FilterSpec::min("minPrice", "price"))
			.build()
			.unwrap_err();
		assert_eq!(err, DescriptorError::DuplicateFilter("minPrice".to_string()));
	}

	#[rstest]
	fn test_searchable_fields_follow_roles_and_weights() {
		let entity = base()
			.field(FieldSpec::text("description").description())
			.field(FieldSpec::text("slug"))
			.field(FieldSpec::text("instructor").weight(0.5))
			.build()
			.unwrap();
		let names: Vec<_> = entity
			.searchable_fields()
			.map(|field| field.name().as_str())
			.collect();
		assert_eq!(names, vec!["title", "description", "instructor"]);
	}
}

//! Locale-aware field resolution
//!
//! Each field gets one expression per [`Locale`], built once from the entity
//! definition. A request's locale only selects among these variants; it never
//! contributes text to a query.

use crate::expr::Expr;
use catalog_core::{EntityDescriptor, FieldSpec, Identifier, Locale};

/// Expressions of one field, indexed by locale
#[derive(Debug, Clone, PartialEq)]
struct Variants {
	name: Identifier,
	base: Expr,
	secondary: Expr,
}

impl Variants {
	fn of(field: &FieldSpec) -> Self {
		let base = Expr::col(field.base_column());
		let secondary = match field.localized_column() {
			// An empty override is no override: NULLIF folds '' into NULL
			Some(localized) => Expr::Coalesce(vec![
				Expr::NullIfEmpty(Box::new(Expr::col(localized))),
				base.clone(),
			]),
			None => base.clone(),
		};
		Self {
			name: field.name().clone(),
			base,
			secondary,
		}
	}

	fn select(&self, locale: Locale) -> &Expr {
		match locale {
			Locale::Base => &self.base,
			Locale::Secondary => &self.secondary,
		}
	}
}

/// Resolves entity fields to the expression to search and display
///
/// # Examples
///
/// ```
/// use catalog_core::{builtin, Locale};
/// use catalog_query::FieldResolver;
///
/// let courses = builtin::courses().unwrap();
/// let resolver = FieldResolver::for_entity(&courses);
///
/// let title = courses.field("title").unwrap();
/// assert_eq!(resolver.resolve(title, Locale::Base).to_string(), r#""title""#);
/// assert_eq!(
///     resolver.resolve(title, Locale::Secondary).to_string(),
///     r#"COALESCE(NULLIF("title_fr", ''), "title")"#,
/// );
///
/// let price = courses.field("price").unwrap();
/// assert_eq!(resolver.resolve(price, Locale::Secondary).to_string(), r#""price""#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldResolver {
	fields: Vec<Variants>,
	searchable: Vec<Identifier>,
}

impl FieldResolver {
	pub fn for_entity(entity: &EntityDescriptor) -> Self {
		Self {
			fields: entity.fields().iter().map(Variants::of).collect(),
			searchable: entity
				.searchable_fields()
				.map(|field| field.name().clone())
				.collect(),
		}
	}

	/// Expression for `field` in `locale`
	///
	/// Fields declared on the entity use their precomputed variants; any
	/// other field is resolved from its own definition.
	pub fn resolve(&self, field: &FieldSpec, locale: Locale) -> Expr {
		match self.variants(field.name().as_str()) {
			Some(variants) => variants.select(locale).clone(),
			None => Variants::of(field).select(locale).clone(),
		}
	}

	/// Expression for a declared field, by name
	pub fn resolve_by_name(&self, name: &str, locale: Locale) -> Option<&Expr> {
		self.variants(name).map(|variants| variants.select(locale))
	}

	/// Concatenation of every searchable field, the document matched against
	/// a search query
	pub fn document(&self, locale: Locale) -> Expr {
		let parts = self
			.searchable
			.iter()
			.filter_map(|name| self.resolve_by_name(name.as_str(), locale))
			.cloned()
			.collect();
		Expr::Concat(parts)
	}

	fn variants(&self, name: &str) -> Option<&Variants> {
		self.fields.iter().find(|variants| variants.name.as_str() == name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use catalog_core::builtin;
	use rstest::{fixture, rstest};

	#[fixture]
	fn courses() -> EntityDescriptor {
		builtin::courses().unwrap()
	}

	#[rstest]
	fn test_resolution_is_stable(courses: EntityDescriptor) {
		let resolver = FieldResolver::for_entity(&courses);
		let title = courses.field("title").unwrap();
		assert_eq!(
			resolver.resolve(title, Locale::Secondary),
			resolver.resolve(title, Locale::Secondary)
		);
	}

	#[rstest]
	#[case(Locale::Base, r#"CONCAT_WS(' ', "title", "description")"#)]
	#[case(
		Locale::Secondary,
		r#"CONCAT_WS(' ', COALESCE(NULLIF("title_fr", ''), "title"), COALESCE(NULLIF("description_fr", ''), "description"))"#
	)]
	fn test_document(courses: EntityDescriptor, #[case] locale: Locale, #[case] expected: &str) {
		let resolver = FieldResolver::for_entity(&courses);
		assert_eq!(resolver.document(locale).to_string(), expected);
	}

	#[rstest]
	fn test_resolution_binds_nothing(courses: EntityDescriptor) {
		let resolver = FieldResolver::for_entity(&courses);
		for field in courses.fields() {
			for locale in Locale::ALL {
				assert!(resolver.resolve(field, locale).values().is_empty());
			}
		}
	}

	#[rstest]
	fn test_undeclared_field(courses: EntityDescriptor) {
		let resolver = FieldResolver::for_entity(&courses);
		let subtitle = FieldSpec::text("subtitle");
		assert_eq!(
			resolver.resolve(&subtitle, Locale::Secondary).to_string(),
			r#""subtitle""#
		);
		assert!(resolver.resolve_by_name("subtitle", Locale::Base).is_none());
	}
}

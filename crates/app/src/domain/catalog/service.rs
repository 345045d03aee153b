//! Catalog service.

use std::sync::Arc;

use async_trait::async_trait;
use larder::{fixtures::Fixture, items::MealId, reorder::MealAvailability};
use mockall::automock;

use crate::domain::catalog::errors::CatalogServiceError;

/// Catalog backed by a loaded fixture set.
#[derive(Debug, Clone)]
pub struct FixtureCatalogService {
    fixture: Arc<Fixture>,
}

impl FixtureCatalogService {
    #[must_use]
    pub fn new(fixture: Arc<Fixture>) -> Self {
        Self { fixture }
    }
}

#[async_trait]
impl CatalogService for FixtureCatalogService {
    async fn get_meal_availability(
        &self,
        meal_ids: &[MealId],
    ) -> Result<Vec<MealAvailability>, CatalogServiceError> {
        Ok(self.fixture.meal_availability(meal_ids))
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Live availability of the given meals.
    ///
    /// Meals the catalog does not know are left out of the response.
    async fn get_meal_availability(
        &self,
        meal_ids: &[MealId],
    ) -> Result<Vec<MealAvailability>, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::fixture;

    use super::*;

    #[tokio::test]
    async fn unknown_meals_are_left_out() -> TestResult {
        let service = FixtureCatalogService::new(fixture()?);

        let meals = service
            .get_meal_availability(&[MealId::from("lasagne"), MealId::from("haggis")])
            .await?;

        assert_eq!(meals.len(), 1);
        assert_eq!(meals.first().map(|meal| meal.id.as_str()), Some("lasagne"));

        Ok(())
    }

    #[tokio::test]
    async fn retired_meals_are_reported_inactive() -> TestResult {
        let service = FixtureCatalogService::new(fixture()?);

        let meals = service
            .get_meal_availability(&[MealId::from("shepherds-pie")])
            .await?;

        assert!(meals.iter().all(|meal| !meal.is_active));

        Ok(())
    }
}

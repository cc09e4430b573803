// Dataset endpoints

use tracing::debug;

use crate::client::SupersetClient;
use crate::error::Error;
use crate::models::{
    CreateDatasetRequest, Dataset, IdResponse, ItemResponse, ListResponse, UpdateDatasetRequest,
};

impl SupersetClient {
    /// List every dataset.
    ///
    /// `GET /api/v1/dataset/?q=(page_size:5000)`
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, Error> {
        let url = self.listing_url("dataset/")?;
        debug!("listing datasets");
        let resp: ListResponse<Dataset> = self.get(url).await?;
        Ok(resp.result)
    }

    /// Fetch a single dataset.
    ///
    /// `GET /api/v1/dataset/{id}`
    pub async fn get_dataset(&self, id: i64) -> Result<Dataset, Error> {
        let url = self.api_url(&format!("dataset/{id}"))?;
        debug!(dataset_id = id, "fetching dataset");
        let resp: ItemResponse<Dataset> = self.get(url).await?;
        let mut dataset = resp.result;
        dataset.id = dataset.id.or(resp.id).or(Some(id));
        Ok(dataset)
    }

    /// Create a dataset and return its id.
    ///
    /// `POST /api/v1/dataset/`
    pub async fn create_dataset(&self, request: &CreateDatasetRequest) -> Result<i64, Error> {
        let url = self.api_url("dataset/")?;
        debug!(
            table_name = %request.table_name,
            database_id = request.database,
            "creating dataset"
        );
        let resp: IdResponse = self.post(url, request, None).await?;
        Ok(resp.id)
    }

    /// Update a dataset's table name, schema, and SQL.
    ///
    /// `PUT /api/v1/dataset/{id}`. The database cannot be changed here.
    pub async fn update_dataset(&self, id: i64, request: &UpdateDatasetRequest) -> Result<(), Error> {
        let url = self.api_url(&format!("dataset/{id}"))?;
        debug!(dataset_id = id, "updating dataset");
        self.put_unit(url, request, None).await
    }

    /// Delete a dataset.
    ///
    /// `DELETE /api/v1/dataset/{id}`
    pub async fn delete_dataset(&self, id: i64) -> Result<(), Error> {
        let url = self.api_url(&format!("dataset/{id}"))?;
        debug!(dataset_id = id, "deleting dataset");
        self.delete(url, None).await
    }
}

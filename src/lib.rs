pub mod color;
pub mod config;
pub mod pick;
pub mod point_cloud;
pub mod render;
pub mod scene;
pub mod standardize;
pub mod state;
pub mod structure;
pub mod ui;
pub mod view;

pub use config::{ConfigError, SceneConfig};
pub use point_cloud::{
    ColorQuantity, DataType, POINT_CLOUD_TYPE, PointCloud, PointCloudOptions, PointCloudQuantity,
    QuantityError, ScalarQuantity, VectorQuantity, VectorType,
};
pub use scene::{PickHit, Scene, SceneError, SceneResult};
pub use structure::Structure;

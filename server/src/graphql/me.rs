use async_graphql::SimpleObject;
use entity::departments;
use products_hr::users::UserPublic;

#[derive(Clone, Debug, SimpleObject)]
pub struct MePayload {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
}

impl From<UserPublic> for MePayload {
    fn from(user: UserPublic) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            full_name: user.full_name,
            role: products_hr::role_from_entity(user.role).as_str().to_string(),
            is_active: user.is_active,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DepartmentNode {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub manager_id: String,
}

impl From<departments::Model> for DepartmentNode {
    fn from(model: departments::Model) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name,
            description: model.description,
            manager_id: model.manager_id.to_string(),
        }
    }
}

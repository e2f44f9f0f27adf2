use crate::api_subs::routes;
use actix_web::web::{self};

pub fn mount_subs() -> actix_web::Scope {
    web::scope("/sub").service(routes::sub::get_packages)
}
pub fn mount_secure_subs() -> actix_web::Scope {
    web::scope("/sub")
        .service(routes::sub::get_current)
        .service(routes::sub::post_cancel)
        .service(routes::sub::post_pause)
        .service(routes::sub::post_resume)
}
pub fn mount_authorize() -> actix_web::Scope {
    web::scope("/pay").service(routes::pay::post_authorize)
}
pub fn mount_secure_pay() -> actix_web::Scope {
    web::scope("/pay").service(routes::pay::post_capture)
}
pub fn mount_admin() -> actix_web::Scope {
    web::scope("/admin")
        .service(routes::admin::post_package)
        .service(routes::admin::put_package)
        .service(routes::admin::put_subscription)
        .service(routes::admin::post_deactivate_package)
        .service(routes::admin::post_assign_subscription)
}

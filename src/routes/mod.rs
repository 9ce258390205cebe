pub mod auth;
pub mod chat;
pub mod files;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use actix_web::web;

/// The route table. Static task paths are registered ahead of `/tasks/{id}`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(users::me)
        .service(
            web::scope("/tasks")
                .service(tasks::get_completed_tasks)
                .service(tasks::mark_all_completed)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/projects")
                .service(projects::get_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project),
        )
        .service(chat::chat)
        .service(files::upload)
        .service(files::serve_upload);
}

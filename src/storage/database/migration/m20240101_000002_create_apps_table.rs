use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Apps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Apps::Reference)
                            .string_len(256)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Apps::LastSeen).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Apps::DefaultSampleRate).double().not_null())
                    .col(ColumnDef::new(Apps::ActiveSampleRate).double().not_null())
                    .col(
                        ColumnDef::new(Apps::ActiveWindowEnd)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Apps::ProjectId).string_len(50).null())
                    .col(ColumnDef::new(Apps::Env).string_len(50).null())
                    .col(ColumnDef::new(Apps::Command).string_len(50).null())
                    .col(
                        ColumnDef::new(Apps::WsgiCollectMetrics)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Apps::WsgiMetrics).json().null())
                    .col(ColumnDef::new(Apps::WsgiIgnorePath).json().not_null())
                    .col(
                        ColumnDef::new(Apps::CeleryCollectMetrics)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Apps::CeleryMetrics).json().null())
                    .col(ColumnDef::new(Apps::CeleryIgnoreTask).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_apps_project_id")
                            .from(Apps::Table, Apps::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_apps_active_window_end")
                    .table(Apps::Table)
                    .col(Apps::ActiveWindowEnd)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_apps_last_seen")
                    .table(Apps::Table)
                    .col(Apps::LastSeen)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Apps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Apps {
    Table,
    Reference,
    LastSeen,
    DefaultSampleRate,
    ActiveSampleRate,
    ActiveWindowEnd,
    ProjectId,
    Env,
    Command,
    WsgiCollectMetrics,
    WsgiMetrics,
    WsgiIgnorePath,
    CeleryCollectMetrics,
    CeleryMetrics,
    CeleryIgnoreTask,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

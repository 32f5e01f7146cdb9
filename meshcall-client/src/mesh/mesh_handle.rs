use crate::mesh::{MeshCommand, MeshSnapshot};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error};

const COMMAND_CHANNEL_CAPACITY: usize = 100;

/// Клонируемая ручка к запущенному [`Mesh`](crate::mesh::Mesh).
#[derive(Clone)]
pub struct MeshHandle {
    commands: mpsc::Sender<MeshCommand>,
    snapshot: watch::Receiver<MeshSnapshot>,
}

/// Вторая половина канала: забирается при создании Mesh.
pub struct MeshInbox {
    pub(crate) commands: mpsc::Receiver<MeshCommand>,
    pub(crate) snapshot: watch::Sender<MeshSnapshot>,
}

impl MeshHandle {
    pub fn channel() -> (MeshHandle, MeshInbox) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(MeshSnapshot::default());

        (
            MeshHandle {
                commands: commands_tx,
                snapshot: snapshot_rx,
            },
            MeshInbox {
                commands: commands_rx,
                snapshot: snapshot_tx,
            },
        )
    }

    /// Возвращает false, если цикл Mesh уже завершился.
    pub async fn send(&self, cmd: MeshCommand) -> bool {
        if let Err(e) = self.commands.send(cmd).await {
            error!("Mesh is gone, dropping command: {:?}", e.0);
            return false;
        }
        true
    }

    pub fn snapshot(&self) -> MeshSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MeshSnapshot> {
        self.snapshot.clone()
    }

    /// Ждать, пока снимок не удовлетворит условию.
    /// `None`, если Mesh завершился раньше.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&MeshSnapshot) -> bool,
    ) -> Option<MeshSnapshot> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx.wait_for(predicate).await.ok()?;
        Some(snapshot.clone())
    }

    /// Выйти из комнаты и дождаться освобождения ресурсов.
    /// Повторный вызов (и вызов после остановки Mesh) ничего не делает.
    pub async fn leave(&self) {
        let (done, done_rx) = oneshot::channel();
        if self.commands.send(MeshCommand::Leave { done }).await.is_err() {
            debug!("Mesh already stopped, nothing to leave");
            return;
        }
        let _ = done_rx.await;
    }
}
